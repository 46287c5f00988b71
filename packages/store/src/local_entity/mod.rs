pub mod local_image;
