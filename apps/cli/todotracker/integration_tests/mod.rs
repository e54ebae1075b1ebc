mod cli;
mod helpers;
mod serve;
