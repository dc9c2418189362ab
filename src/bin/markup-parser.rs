use anyhow::anyhow;
use markup_bin::config::{Dialect, DtdContext, ParserConfig};
use markup_bin::lexer::state::LexerMode;
use markup_bin::lexer::tokenize;
use markup_bin::shared::errors::ParseError;
use markup_bin::shared::location::LineIndex;
use markup_bin::shared::types::Result;
use markup_bin::walker::Walker;
use markup_bin::{drive_builder, parse_with_config, EventCollector};
use simple_logger::SimpleLogger;
use std::fs;

fn main() -> Result<()> {
    let matches = clap::Command::new("Markup parser")
        .version("0.1.0")
        .arg(
            clap::Arg::new("file")
                .help("The file to parse")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("html")
                .help("Parse the file as HTML")
                .long("html")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("dtd")
                .help("Parse the file as DTD text, starting at the given context (e.g. markup-decl)")
                .long("dtd")
                .value_name("CONTEXT")
                .conflicts_with("html"),
        )
        .arg(
            clap::Arg::new("config")
                .help("JSON file with the parser configuration")
                .long("config")
                .short('c')
                .value_name("FILE"),
        )
        .arg(
            clap::Arg::new("tokens")
                .help("Just print the tokens")
                .long("tokens")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("events")
                .help("Print the builder events instead of the tree")
                .long("events")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("quiet")
                .help("Don't display the tree")
                .long("quiet")
                .short('q')
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("debug")
                .help("Enable debug logging")
                .short('d')
                .long("debug")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    let quiet = matches.get_flag("quiet");
    let file = matches
        .get_one::<String>("file")
        .ok_or_else(|| anyhow!("no file given"))?;

    if debug {
        SimpleLogger::new().init()?;
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ParserConfig::from_json(&fs::read_to_string(path)?)?,
        None => ParserConfig::default(),
    };
    if matches.get_flag("html") {
        config.dialect = Dialect::Html;
    }
    if let Some(context) = matches.get_one::<String>("dtd") {
        config.dtd_context = Some(context.parse::<DtdContext>()?);
    }
    if config.dialect == Dialect::Html && config.dtd_context.is_some() {
        return Err(anyhow!("html cannot be parsed with a dtd context"));
    }
    if config.source.is_none() {
        config.source = Some(file.clone());
    }

    let source = fs::read_to_string(file)?;

    if matches.get_flag("tokens") {
        print_tokens(&source, &config);
        return Ok(());
    }

    let tree = parse_with_config(&source, &config);

    if matches.get_flag("events") {
        let mut collector = EventCollector::new(config.processing_order);
        drive_builder(&tree, &mut collector, config.processing_order);
        for event in &collector.events {
            println!("{event}");
        }
    } else if !quiet {
        Walker::new(&tree).walk_stdout();
    }

    let errors = tree.errors();
    let index = LineIndex::new(&source);
    for err in &errors {
        display_snippet(&index, err);
    }
    if !errors.is_empty() {
        println!("{} error(s) found", errors.len());
    }

    Ok(())
}

fn display_snippet(index: &LineIndex, err: &ParseError) {
    let located = err.locate(index.location(err.range.start));
    let loc = &located.location;
    let col_nr = loc.column - 1;

    println!();
    println!("error: {located}");

    if col_nr > 1000 {
        println!("Error is too far to the right to display.");
        return;
    }

    // Print the previous 2 lines
    for n in loc.line.saturating_sub(2).max(1)..loc.line {
        if let Some(text) = index.line_text(n) {
            println!("{n:<5}|{text}");
        }
    }

    // Print the line with the error and a pointer to the error
    if let Some(text) = index.line_text(loc.line) {
        println!("{:<5}|{}", loc.line, text);
        let width = if err.range.is_empty() { 1 } else { err.range.len() };
        println!("     |{}{}", "-".repeat(col_nr), "^".repeat(width));
    }
}

fn print_tokens(source: &str, config: &ParserConfig) {
    let mode = match (config.dtd_context, config.dialect) {
        (Some(DtdContext::MarkupDecl), _) => LexerMode::Dtd,
        (Some(_), _) => LexerMode::DtdDeclaration,
        (None, Dialect::Xml) => LexerMode::Xml,
        (None, Dialect::Html) => LexerMode::Html,
    };

    for token in tokenize(source, mode) {
        println!("{:?} {:?} {}", token.kind, token.text(source), token.range);
    }
}
