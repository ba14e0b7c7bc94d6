// Copyright 2025 minirpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # minirpc CLI
//!
//! Command-line interface for the minirpc framework.
//!
//! This crate provides the main entry point for running and calling minirpc
//! services:
//!
//! - **Serving**: start a server exposing the demo arithmetic functions
//! - **Resolving**: look up a function id by name
//! - **Calling**: invoke a function and print the result as JSON
//!
//! ## Key Commands
//!
//! - `minirpc serve`: Start a server with `add2`, `minus2` and `times2`
//! - `minirpc find`: Resolve a name (prints the id)
//! - `minirpc call`: Resolve and call (outputs raw JSON for scripting)

pub mod arith;
