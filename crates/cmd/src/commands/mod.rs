// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod build;
pub mod init;
pub mod query;
pub mod states;
pub mod tables;

pub use build::build_command;
pub use init::init_command;
pub use query::{queries_command, query_command, sql_command};
pub use states::states_command;
pub use tables::tables_command;
