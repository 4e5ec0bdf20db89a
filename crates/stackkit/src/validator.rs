//! Template validation.

use crate::backend::Provisioner;
use crate::error::Result;
use crate::types::{DeclaredParameter, Template};

/// Submit `template` to the provider and return its declared parameters,
/// in declaration order.
///
/// A rejected template yields [`crate::Error::Validation`].
pub fn validate<P: Provisioner + ?Sized>(
    provisioner: &P,
    template: &Template,
) -> Result<Vec<DeclaredParameter>> {
    log::info!("Validating template ({} bytes)", template.bytes().len());
    let declared = provisioner.validate(template)?;
    log::debug!(
        "Template declares {} parameter(s): {}",
        declared.len(),
        declared
            .iter()
            .map(|p| p.key.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockProvisioner;
    use crate::error::Error;

    #[test]
    fn test_validate_returns_declared_parameters_in_order() {
        let declared = vec![
            DeclaredParameter::new("KeyName", "SSH key"),
            DeclaredParameter::new("InstanceType", "EC2 type").with_default("t2.micro"),
            DeclaredParameter::new("Subnet", "Subnet id"),
        ];
        let mock = MockProvisioner::new().with_parameters(declared.clone());

        let result = validate(&mock, &Template::new("{}")).unwrap();

        assert_eq!(result, declared);
    }

    #[test]
    fn test_validate_surfaces_rejection() {
        let mock = MockProvisioner::new().failing_validation("invalid template property");

        let err = validate(&mock, &Template::new("{}")).unwrap_err();

        assert!(matches!(err, Error::Validation { ref message } if message == "invalid template property"));
    }
}
