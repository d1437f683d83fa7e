pub mod auth;
pub mod booking;
pub mod lifecycle;
pub mod slots;

#[cfg(test)]
pub(crate) mod testing;
