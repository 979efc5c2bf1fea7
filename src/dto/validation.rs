//! Validation helpers for DTOs.

use std::net::Ipv4Addr;

use validator::ValidationError;

/// Validates that a host is a dotted IPv4 address.
pub fn validate_ipv4(host: &str) -> Result<(), ValidationError> {
    if host.parse::<Ipv4Addr>().is_err() {
        let mut err = ValidationError::new("ipv4");
        err.message = Some(format!("`{host}` is not a valid IPv4 address").into());
        return Err(err);
    }
    Ok(())
}

/// Parses a port given as text, accepting 1..=65535 only.
pub fn parse_port(port: &str) -> Result<u16, ValidationError> {
    match port.trim().parse::<u16>() {
        Ok(value) if value > 0 => Ok(value),
        _ => {
            let mut err = ValidationError::new("port");
            err.message = Some(format!("`{port}` is not a valid port").into());
            Err(err)
        }
    }
}

/// Validates a numeric port.
pub fn validate_port(port: u32) -> Result<(), ValidationError> {
    parse_port(&port.to_string()).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_validation() {
        assert!(validate_ipv4("135.125.56.26").is_ok());
        assert!(validate_ipv4("256.1.1.1").is_err());
        assert!(validate_ipv4("example.com").is_err());
        assert!(validate_ipv4("").is_err());
    }

    #[test]
    fn port_parsing() {
        assert_eq!(parse_port("16567").unwrap(), 16567);
        assert_eq!(parse_port(" 29900 ").unwrap(), 29900);
        assert!(parse_port("0").is_err());
        assert!(parse_port("65536").is_err());
        assert!(parse_port("abc").is_err());
        assert!(validate_port(70_000).is_err());
    }
}
