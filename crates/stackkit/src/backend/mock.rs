//! Scripted backend that records every call.

use crate::backend::Provisioner;
use crate::error::{Error, Result};
use crate::types::{Ack, DeclaredParameter, StackRequest, StackStatus, Template};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded provisioner call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Validate,
    Create(CreateCall),
    Delete(String),
    Describe(String),
}

/// Comparable snapshot of a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCall {
    pub name: String,
    pub parameters: Vec<(String, String)>,
}

/// Backend returning scripted results.
///
/// `describe` pops from a queue; once only one entry remains it is
/// repeated, so the last status sticks.
#[derive(Default)]
pub struct MockProvisioner {
    pub declared: Vec<DeclaredParameter>,
    pub validate_error: Option<String>,
    pub submit_error: Option<String>,
    describes: Mutex<VecDeque<std::result::Result<StackStatus, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(mut self, declared: Vec<DeclaredParameter>) -> Self {
        self.declared = declared;
        self
    }

    pub fn failing_validation(mut self, message: &str) -> Self {
        self.validate_error = Some(message.to_string());
        self
    }

    pub fn failing_submission(mut self, message: &str) -> Self {
        self.submit_error = Some(message.to_string());
        self
    }

    /// Queue describe results. `Err("transient")` yields a transient
    /// error, `Err("missing")` a not-found error.
    pub fn with_describes(self, results: Vec<std::result::Result<StackStatus, &str>>) -> Self {
        *self.describes.lock().unwrap() = results
            .into_iter()
            .map(|r| r.map_err(str::to_string))
            .collect();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn describe_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Describe(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Provisioner for MockProvisioner {
    fn provider(&self) -> &'static str {
        "mock"
    }

    fn validate(&self, _template: &Template) -> Result<Vec<DeclaredParameter>> {
        self.record(Call::Validate);
        match &self.validate_error {
            Some(message) => Err(Error::Validation {
                message: message.clone(),
            }),
            None => Ok(self.declared.clone()),
        }
    }

    fn create(&self, request: &StackRequest) -> Result<Ack> {
        self.record(Call::Create(CreateCall {
            name: request.name.clone(),
            parameters: request
                .parameters
                .iter()
                .map(|p| (p.key.clone(), p.value.clone()))
                .collect(),
        }));
        match &self.submit_error {
            Some(message) => Err(Error::Submission {
                operation: "create".to_string(),
                message: message.clone(),
            }),
            None => Ok(Ack::new(&request.name, Some("stack-id".to_string()))),
        }
    }

    fn delete(&self, name: &str) -> Result<Ack> {
        self.record(Call::Delete(name.to_string()));
        match &self.submit_error {
            Some(message) => Err(Error::Submission {
                operation: "delete".to_string(),
                message: message.clone(),
            }),
            None => Ok(Ack::new(name, None)),
        }
    }

    fn describe(&self, name: &str) -> Result<StackStatus> {
        self.record(Call::Describe(name.to_string()));
        let mut queue = self.describes.lock().unwrap();
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match next {
            Some(Ok(status)) => Ok(status),
            Some(Err(kind)) if kind == "missing" => Err(Error::StackNotFound {
                name: name.to_string(),
            }),
            Some(Err(message)) => Err(Error::Transient { message }),
            None => Ok(StackStatus::Unknown),
        }
    }
}
