mod common;
mod images;
mod records;
mod stores;
