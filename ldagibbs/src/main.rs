//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

//! The command line front end.

mod cli;
mod commands;

use clap::Parser;
use env_logger::Target;
use crate::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let _ = env_logger::builder()
        .target(Target::Stderr)
        .filter_level(cli.level_filter())
        .try_init();

    let result = match &cli.command {
        Commands::Train(args) => commands::train(args),
        Commands::Infer(args) => commands::infer(args),
        Commands::Topics(args) => commands::topics(args),
    };

    if let Err(err) = result {
        log::error!("{err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
