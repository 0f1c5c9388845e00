mod clinic;
mod common;
mod mfm;
mod service;
