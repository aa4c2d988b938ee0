// ABOUTME: Row cursor over rows already held in memory
// ABOUTME: Used by scripted executors and benchmarks that need a cursor without a driver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::RowCursor;
use crate::errors::BindResult;
use crate::value::Value;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Cursor yielding a fixed list of rows in order
#[derive(Debug, Clone, Default)]
pub struct StaticCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl StaticCursor {
    /// Cursor over `rows`, each row positionally matching `columns`
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }

    /// Rows not yet read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait]
impl RowCursor for StaticCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> BindResult<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}
