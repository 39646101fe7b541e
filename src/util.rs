use num_bigint::BigUint;

/// `name (B bits) = decimal`, the layout used for verbose key output
pub fn describe(name: &str, value: &BigUint) -> String {
    format!("{name} ({} bits) = {value}", value.bits())
}
