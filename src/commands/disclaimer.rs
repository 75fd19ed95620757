//! Destructive-operation warning and consent prompt

use anyhow::{bail, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

const WARNING_BOX: &str = r#"
╔══════════════════════════════════════════════════════════════╗
║         ⚠  DESTRUCTIVE OPERATION: READ CAREFULLY  ⚠          ║
╠══════════════════════════════════════════════════════════════╣
║                                                              ║
║  This tool will make IRREVERSIBLE changes to your database   ║
║  and project files, including:                               ║
║                                                              ║
║  • Dropping approximately 90 database tables                 ║
║  • Removing and rewriting primary keys across core tables    ║
║  • Modifying your project's composer.json                    ║
║                                                              ║
║  These changes cannot be automatically rolled back.          ║
║  You MUST take a full database backup (mysqldump) before     ║
║  running this tool.                                          ║
║                                                              ║
╠══════════════════════════════════════════════════════════════╣
║  DISCLAIMER                                                  ║
║                                                              ║
║  This software is provided "as is", without warranty of      ║
║  any kind, express or implied. The authors and contributors  ║
║  shall not be liable for any direct, indirect, incidental,   ║
║  special, or consequential damages (including but not        ║
║  limited to data loss, system downtime, or loss of business) ║
║  arising from the use of or inability to use this tool,      ║
║  even if advised of the possibility of such damages.         ║
║                                                              ║
║  Use of this tool is entirely at your own risk. By           ║
║  proceeding you confirm you have taken an appropriate        ║
║  backup and accept full responsibility for the outcome.      ║
╚══════════════════════════════════════════════════════════════╝
"#;

const AGREE: &str = "I Agree";
const DISAGREE: &str = "I Do Not Agree";

/// Show the warning and wait for consent, unless `--accept-terms` was given
pub fn require_confirmation(accept_terms: bool) -> Result<()> {
    if accept_terms {
        return Ok(());
    }

    println!("{}", WARNING_BOX.bright_yellow());
    print!(
        "Do you accept these terms and wish to proceed? [0] {}, [1] {} (default: 0): ",
        DISAGREE, AGREE
    );
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;

    if !is_agreement(&input) {
        bail!("You did not agree to the terms. Exiting.");
    }
    Ok(())
}

/// Accepts the choice index or the choice text
fn is_agreement(answer: &str) -> bool {
    let answer = answer.trim();
    answer == "1" || answer.eq_ignore_ascii_case(AGREE)
}
