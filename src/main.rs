// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

use clap::Parser;
use tomd::cli::Config;

fn main() {
    let config = Config::parse();
    tomd::cli::run(config)
}
