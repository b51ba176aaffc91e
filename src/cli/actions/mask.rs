use crate::mask::mask_sensitive_value;

pub fn execute(value: &str) {
    println!("{}", mask_sensitive_value(value));
}
