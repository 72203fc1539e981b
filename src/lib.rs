// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! exec-kit
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod command;
mod deadline;
pub mod descriptor;
pub mod error;
pub mod process;
pub mod reader;
pub mod signal;
pub mod status;
pub mod streams;
pub mod writer;

pub use builder::ProcessBuilder;
pub use command::Command;
pub use descriptor::{AccessMode, StreamDescriptor, StreamSlot};
pub use error::ExecError;
pub use process::Process;
pub use reader::StreamReader;
pub use signal::Signal;
pub use status::{Output, Status};
pub use streams::ProcessStreams;
pub use writer::StreamWriter;
