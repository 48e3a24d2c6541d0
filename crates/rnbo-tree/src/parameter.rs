//! A single typed parameter attached to a tree node.

use crate::types::{AccessMode, Domain, ParamValue};

pub type ValueCallback = Box<dyn Fn(&ParamValue) + Send>;

pub struct Parameter {
    pub access: AccessMode,
    pub description: Option<String>,
    pub domain: Option<Domain>,
    pub value: ParamValue,
    callback: Option<ValueCallback>,
}

impl Parameter {
    pub fn new(access: AccessMode, value: ParamValue) -> Self {
        Self {
            access,
            description: None,
            domain: None,
            value,
            callback: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn with_callback(mut self, callback: ValueCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Apply the domain's clip policy, store, then invoke the registered
    /// callback, if any.
    pub fn set(&mut self, value: ParamValue) {
        let value = match &self.domain {
            Some(domain) => domain.apply(value),
            None => value,
        };
        self.value = value.clone();
        if let Some(cb) = &self.callback {
            cb(&self.value);
        }
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("access", &self.access)
            .field("description", &self.description)
            .field("domain", &self.domain)
            .field("value", &self.value)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn set_applies_domain_clip_then_fires_callback() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        let mut p = Parameter::new(AccessMode::Bi, ParamValue::Float(0.0))
            .with_domain(Domain::numeric(0.0, 1.0, true))
            .with_callback(Box::new(move |_| fired2.store(true, Ordering::SeqCst)));

        p.set(ParamValue::Float(5.0));
        assert_eq!(p.value, ParamValue::Float(1.0));
        assert!(fired.load(Ordering::SeqCst));
    }
}
