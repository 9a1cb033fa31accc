mod counters;
mod submissions;
