use formwork::{ProcessResultVerbose, RuleOutcome, Strategy};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(res: &ProcessResultVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint("⚙  Processing submission", ansi::CYAN)));

    // Mapping summary
    println!("\n{}", palette.paint("━━━ Mapped Roles ━━━", ansi::GRAY));
    print_mapping(res, &palette);

    if !res.details.hidden_fields.is_empty() {
        println!("\n{}", palette.paint("━━━ Hidden Fields ━━━", ansi::GRAY));
        for id in &res.details.hidden_fields {
            println!("  {} {}", palette.dim("✗"), palette.paint(id, ansi::YELLOW));
        }
    }

    // Rule verdicts
    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    print_rules(res, &palette);

    // Rendered / skipped emails
    println!("\n{}", palette.paint("━━━ Emails ━━━", ansi::GRAY));
    print_emails(res, &palette);

    // Timing
    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Mapping: {}  │  Evaluation: {}  │  Rendering: {}",
        palette.paint(format!("{:?}", res.details.total), ansi::GREEN),
        palette.paint(format!("{:?}", res.details.mapping_total), ansi::CYAN),
        palette.dim(format!("{:?}", res.details.evaluation_total)),
        palette.dim(format!("{:?}", res.details.rendering_total)),
    );
    println!();
}

fn print_mapping(res: &ProcessResultVerbose, palette: &ansi::Palette) {
    if res.details.mapping.is_empty() {
        println!("{}", palette.dim("  No roles mapped"));
        return;
    }

    for (idx, trace) in res.details.mapping.iter().enumerate() {
        let value = res
            .mapped
            .get(&trace.role)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{}]", idx), ansi::GRAY),
            palette.bold(palette.paint(&trace.role, ansi::GREEN)),
            palette.dim("="),
            palette.paint(value, ansi::YELLOW),
        );
        let source = match &trace.field_id {
            Some(id) => format!("  (field {id})"),
            None => String::new(),
        };
        println!(
            "      {} {}{}",
            palette.dim("via:"),
            palette.paint(strategy_label(trace.strategy), ansi::BLUE),
            palette.dim(source),
        );
    }
}

fn print_rules(res: &ProcessResultVerbose, palette: &ansi::Palette) {
    if res.details.rules.is_empty() {
        println!("{}", palette.dim("  No rules configured"));
        return;
    }

    let mut fired = 0usize;
    for verdict in &res.details.rules {
        let name = if verdict.rule_name.is_empty() {
            verdict.rule_id.clone()
        } else {
            format!("{} \"{}\"", verdict.rule_id, verdict.rule_name)
        };
        match &verdict.outcome {
            RuleOutcome::Fired => {
                fired += 1;
                println!(
                    "  {} {} {}",
                    palette.paint("✓", ansi::GREEN),
                    palette.paint(name, ansi::CYAN),
                    palette.paint("fired", ansi::GREEN)
                );
            }
            RuleOutcome::Inactive => {
                println!("  {} {} {}", palette.dim("✗"), palette.paint(name, ansi::CYAN), palette.dim("inactive"));
            }
            RuleOutcome::ConditionFailed { index, field } => {
                println!(
                    "  {} {} {}",
                    palette.dim("✗"),
                    palette.paint(name, ansi::CYAN),
                    palette.dim(format!("condition[{}] on \"{}\" not met", index, field))
                );
            }
        }
    }

    if fired == 0 {
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • Condition references don't settle (check field ids, stable ids, labels)");
        println!("  • A referenced field is hidden by conditional logic for this submission");
        println!("  • Values don't match (comparisons never coerce across incompatible types)");
        println!("\n{}", palette.dim("  Tip: Set RUST_LOG=formwork=debug to see per-condition decisions"));
    }
}

fn print_emails(res: &ProcessResultVerbose, palette: &ansi::Palette) {
    if res.emails.is_empty() && res.skipped.is_empty() {
        println!("{}", palette.dim("  No emails produced"));
        return;
    }

    for email in &res.emails {
        println!(
            "  {} {} {} {}",
            palette.paint("✓", ansi::GREEN),
            palette.bold(palette.paint(&email.recipient, ansi::GREEN)),
            palette.dim("│"),
            palette.paint(format!("subject \"{}\"", email.subject), ansi::YELLOW),
        );
        println!(
            "      {} {}  {} {}",
            palette.dim("rule:"),
            palette.paint(&email.rule_id, ansi::CYAN),
            palette.dim("│ template:"),
            palette.paint(&email.template_id, ansi::BLUE)
        );
        if !email.cc.is_empty() || !email.bcc.is_empty() {
            println!(
                "      {} {}  {} {}",
                palette.dim("cc:"),
                palette.paint(email.cc.join(", "), ansi::BLUE),
                palette.dim("│ bcc:"),
                palette.paint(email.bcc.join(", "), ansi::BLUE)
            );
        }
        let unresolved = res
            .details
            .renders
            .iter()
            .find(|r| r.rule_id == email.rule_id)
            .map(|r| r.unresolved.as_slice())
            .unwrap_or(&[]);
        if !unresolved.is_empty() {
            let names: Vec<String> = unresolved.iter().map(|n| format!("{{{{{n}}}}}")).collect();
            println!(
                "      {} {}",
                palette.paint("⚠ unresolved:", ansi::YELLOW),
                palette.paint(names.join(" "), ansi::YELLOW)
            );
        }
    }

    for skip in &res.skipped {
        println!(
            "  {} {} {}",
            palette.paint("⚠", ansi::YELLOW),
            palette.paint(&skip.rule_id, ansi::CYAN),
            palette.dim(format!("skipped: {}", skip.reason))
        );
    }
}

fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::ExplicitMapping => "explicit mapping",
        Strategy::FieldType => "field type",
        Strategy::LabelPattern => "label pattern",
        Strategy::FieldKey => "field key",
        Strategy::ContactScan => "contact scan",
    }
}
