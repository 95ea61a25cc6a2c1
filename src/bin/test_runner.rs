use clap::Parser;
use codespan_reporting::term::termcolor::*;
use codespan_reporting::term::*;
use cpre::api::FileDb;
use cpre::{parse_test_case, run_preprocessor_for_testing, StageOutput};

#[derive(clap::ValueEnum, Clone, Copy)]
enum Stage {
    Lex,
    Preprocess,
}

/// Run
#[derive(Parser)]
#[clap(about = "Test runner for the preprocessor.")]
struct Cli {
    #[clap(help = "a path to a test case")]
    test_case: std::path::PathBuf,

    #[clap(
        short,
        long,
        value_delimiter = ',',
        help = "a stage to ignore",
        long_help = r#"A stage to ignore. This can be repeated, or you can pass
the stage names as a comma-separated list.

Examples:
"lex,preprocess" skips the lexing and preprocessing stages."#
    )]
    #[arg(value_enum)]
    ignore: Vec<Stage>,

    #[clap(
        short,
        long,
        help = "output the result to OUT_FILE. Overrides `--write`"
    )]
    out_file: Option<std::path::PathBuf>,

    #[clap(short, long, help = "write to the input file in-place")]
    write: bool,
}

fn main() {
    let args = Cli::parse();

    let test_case =
        std::fs::read_to_string(&args.test_case).expect("file should exist and be a valid string");

    let (source, expected) = parse_test_case(&test_case);

    let mut source_string = source.to_string();
    if !source_string.ends_with("\n") {
        source_string.push('\n');
    }

    let mut result = run_preprocessor_for_testing(source_string.clone());

    if let StageOutput::Err(kind) = &result.preprocessor {
        let mut files = FileDb::new();
        files
            .add_file("main.c".to_string(), source_string)
            .expect("file should add properly");

        let writer = StandardStream::stderr(ColorChoice::Always);
        let config = Config::default();
        let error = cpre::error::Error::new(*kind);
        emit(&mut writer.lock(), &config, &files, &error.diagnostic()).expect("wtf");
    }

    assert_eq!(result, expected);

    for stage in args.ignore {
        match stage {
            Stage::Lex => result.lexer = StageOutput::Ignore,
            Stage::Preprocess => result.preprocessor = StageOutput::Ignore,
        }
    }

    let text = result.test_case(source);

    if let Some(out) = &args.out_file {
        std::fs::write(out, text).expect("failed to write file");
    } else if args.write {
        std::fs::write(&args.test_case, text).expect("failed to write file");
    } else {
        print!("{}", text);
    }
}
