//! Declarative request shapes.

use indexmap::IndexMap;

use crate::field::{FieldDescriptor, FieldValue};

/// A rule over already validated fields; returns a message on failure.
pub type CrossFieldRule = fn(&ValidatedFields) -> Option<String>;

/// A named, ordered set of field descriptors.
///
/// # Example
///
/// ```
/// use scoring_schema::{FieldDescriptor, Shape};
///
/// let shape = Shape::builder("login")
///     .field("login", FieldDescriptor::char().required())
///     .field("password", FieldDescriptor::char().required())
///     .build();
///
/// assert_eq!(shape.field_names().collect::<Vec<_>>(), ["login", "password"]);
/// ```
#[derive(Debug, Clone)]
pub struct Shape {
    name: &'static str,
    fields: IndexMap<&'static str, FieldDescriptor>,
    cross_field: Option<CrossFieldRule>,
}

impl Shape {
    /// Starts building a shape.
    #[must_use]
    pub fn builder(name: &'static str) -> ShapeBuilder {
        ShapeBuilder {
            name,
            fields: IndexMap::new(),
            cross_field: None,
        }
    }

    /// Returns the shape name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Iterates over the fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldDescriptor)> + '_ {
        self.fields.iter().map(|(name, desc)| (*name, desc))
    }

    /// Iterates over the field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    /// Looks up a field descriptor.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Returns the cross-field rule, if any.
    #[must_use]
    pub const fn cross_field(&self) -> Option<CrossFieldRule> {
        self.cross_field
    }
}

/// Builder for [`Shape`].
#[derive(Debug)]
pub struct ShapeBuilder {
    name: &'static str,
    fields: IndexMap<&'static str, FieldDescriptor>,
    cross_field: Option<CrossFieldRule>,
}

impl ShapeBuilder {
    /// Declares the next field.
    #[must_use]
    pub fn field(mut self, name: &'static str, descriptor: FieldDescriptor) -> Self {
        debug_assert!(
            !self.fields.contains_key(name),
            "field '{name}' declared twice in shape '{}'",
            self.name
        );
        self.fields.insert(name, descriptor);
        self
    }

    /// Attaches a post-validation hook.
    #[must_use]
    pub fn cross_field(mut self, rule: CrossFieldRule) -> Self {
        self.cross_field = Some(rule);
        self
    }

    /// Finishes the shape.
    #[must_use]
    pub fn build(self) -> Shape {
        Shape {
            name: self.name,
            fields: self.fields,
            cross_field: self.cross_field,
        }
    }
}

static ABSENT: FieldValue = FieldValue::Absent;

/// One validated value per declared field, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedFields {
    values: IndexMap<&'static str, FieldValue>,
}

impl ValidatedFields {
    pub(crate) fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.values.insert(name, value);
    }

    /// Returns a field's value; undeclared names read as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> &FieldValue {
        self.values.get(name).unwrap_or(&ABSENT)
    }

    /// Returns `true` if the field is present and non-empty.
    #[must_use]
    pub fn is_filled(&self, name: &str) -> bool {
        self.get(name).is_filled()
    }

    /// Names of the present, non-empty fields in declaration order.
    #[must_use]
    pub fn filled_names(&self) -> Vec<&'static str> {
        self.values
            .iter()
            .filter(|(_, value)| value.is_filled())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Removes and returns a field's value.
    pub fn take(&mut self, name: &str) -> FieldValue {
        self.values
            .get_mut(name)
            .map_or(FieldValue::Absent, |value| {
                std::mem::replace(value, FieldValue::Absent)
            })
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a shape with no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_kept() {
        let shape = Shape::builder("s")
            .field("b", FieldDescriptor::char())
            .field("a", FieldDescriptor::char())
            .field("c", FieldDescriptor::char())
            .build();
        assert_eq!(shape.field_names().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert!(shape.field("a").is_some());
        assert!(shape.field("z").is_none());
        assert!(shape.cross_field().is_none());
    }

    #[test]
    fn test_validated_fields() {
        let mut fields = ValidatedFields::default();
        fields.insert("first", FieldValue::Text("x".to_string()));
        fields.insert("second", FieldValue::Empty);
        fields.insert("third", FieldValue::Absent);

        assert_eq!(fields.filled_names(), ["first"]);
        assert!(!fields.is_filled("missing"));
        assert_eq!(fields.take("first"), FieldValue::Text("x".to_string()));
        assert_eq!(fields.get("first"), &FieldValue::Absent);
        assert_eq!(fields.len(), 3);
    }
}
