mod benchmark;
