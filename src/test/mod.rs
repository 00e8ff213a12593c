mod engine;
mod sim_time;
mod support;
