mod amount;
mod bureau;
mod common;
