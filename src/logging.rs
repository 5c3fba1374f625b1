// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

pub const DEFAULT_FILTER: &str = "tallybook=warn";

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays machine readable. Later calls are ignored.
pub fn init(filter: &str) {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
