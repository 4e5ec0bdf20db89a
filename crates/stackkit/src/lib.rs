//! # stackkit
//!
//! Stack lifecycle orchestration over declarative-template providers.
//!
//! This crate provides:
//! - A [`Provisioner`] capability trait with CloudFormation and Deployment
//!   Manager backends that drive the providers' own CLIs
//! - Template validation and interactive parameter resolution
//! - A completion poller with backoff for transient errors, a bounded
//!   budget, and cooperative cancellation
//! - An [`Orchestrator`] that sequences a create or delete end to end
//!
//! ## Example
//!
//! ```no_run
//! use stackkit::{Orchestrator, PollConfig, Provider, Template};
//! use stackkit::resolver::LineSource;
//!
//! let backend = stackkit::backend::connect(Provider::Aws, "eu-central-1", None)
//!     .expect("aws CLI not available");
//! let template = Template::new(std::fs::read("stack.template").unwrap());
//!
//! let stdin = std::io::stdin();
//! let mut input = LineSource::new(stdin.lock(), std::io::stdout());
//!
//! match Orchestrator::new(backend.as_ref(), PollConfig::default())
//!     .create("FurnaceStack", &template, &mut input)
//! {
//!     Ok(report) => println!("{} is {}", report.name, report.status),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! ```
//!
//! ## Retry Logic
//!
//! Throttling and connectivity errors while polling are retried with
//! exponential backoff. Configure it through [`RetryConfig`] inside
//! [`PollConfig`]; nothing else is ever retried.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod resolver;
pub mod retry;
pub mod types;
pub mod validator;

pub use backend::{Provider, Provisioner};
pub use cancel::CancelToken;
pub use error::{Error, ErrorCategory, Result};
pub use orchestrator::{Failure, Orchestrator, Outcome, Report, Stage};
pub use poller::{PollObserver, Poller};
pub use types::{
    Ack, DeclaredParameter, Operation, PollConfig, ResolvedParameter, RetryConfig, StackRequest,
    StackStatus, Template, stack_name,
};
