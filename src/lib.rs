pub mod config;
pub mod discovery;
pub mod gallery;
pub mod layout;
pub mod lazy;
pub mod lightbox;
pub mod manifest;
pub mod probe;
pub mod reactor;
pub mod renumber;
pub mod resource;
pub mod viewer;
