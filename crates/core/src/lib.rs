pub mod domain;
pub mod infra;
pub mod usecase;

#[cfg(test)]
mod testing;
