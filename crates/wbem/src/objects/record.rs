//! Native result records

use std::fmt;
use crate::types::{CimType, Variant};

/// One property value as reported by the provider
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub value: Variant,
    pub cim_type: CimType,
}

impl Property {
    pub fn new(value: Variant, cim_type: CimType) -> Self {
        Self { value, cim_type }
    }
}

/// A native class object (`IWbemClassObject`) produced by the provider
pub trait ClassObject: Send + Sync {
    /// Value of `__CLASS`, if known
    fn class_name(&self) -> Option<String>;

    /// Property names in provider order
    fn property_names(&self) -> Vec<String>;

    /// Read one property
    fn get(&self, name: &str) -> Option<Property>;
}

/// Exclusively owned native record
///
/// Moves from the provider into a sink's batch buffer and from there into
/// the record arena. It cannot be cloned.
pub struct ResultRecord(Box<dyn ClassObject>);

impl ResultRecord {
    pub fn new<T: ClassObject + 'static>(object: T) -> Self {
        Self(Box::new(object))
    }

    pub fn object(&self) -> &dyn ClassObject {
        self.0.as_ref()
    }
}

impl fmt::Debug for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.class_name() {
            Some(class) => write!(f, "ResultRecord({})", class),
            None => f.write_str("ResultRecord(<anonymous>)"),
        }
    }
}

/// In-memory class object with ordered properties
#[derive(Clone, Debug, Default)]
pub struct PropertyBag {
    class_name: Option<String>,
    properties: Vec<(String, Property)>,
}

impl PropertyBag {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            properties: Vec::new(),
        }
    }

    /// Add or replace a property
    pub fn with(mut self, name: impl Into<String>, value: Variant, cim_type: CimType) -> Self {
        self.set(name, value, cim_type);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Variant, cim_type: CimType) {
        let name = name.into();
        let property = Property::new(value, cim_type);
        match self.properties.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = property,
            None => self.properties.push((name, property)),
        }
    }
}

impl ClassObject for PropertyBag {
    fn class_name(&self) -> Option<String> {
        self.class_name.clone()
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|(name, _)| name.clone()).collect()
    }

    // Property names are case-insensitive in WBEM
    fn get(&self, name: &str) -> Option<Property> {
        self.properties
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, property)| property.clone())
    }
}
