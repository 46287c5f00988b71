pub mod product_failure;
pub mod test_case;
