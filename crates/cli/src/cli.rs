use super::CliInput;
use anyhow::{bail, Context, Result};
use serde_yaml::to_writer;
use spatch::{
    compile_source, patch, print_file, ParseOption, Parser, PrintOption, Session, VecErrorHandler,
};
use spatch_cli::PrettyErrorHandler;
use std::io;
use tracing::debug;

pub(super) fn rewrite(input: CliInput) -> Result<String> {
    let (patch_file, source, option, show) = input;

    if show.dump_patch {
        // errors are reported by the compilation below
        let patches = patch::parse(&patch_file, &VecErrorHandler::default());
        for (i, p) in patches.iter().enumerate() {
            let name = p.name.clone().unwrap_or_else(|| format!("#{}", i));
            println!("============ Pattern {} ===========", name);
            to_writer(io::stdout().lock(), &p.minus.fragment)?;
            println!("========== Replacement {} =========", name);
            to_writer(io::stdout().lock(), &p.plus.fragment)?;
        }
        println!(r#"========== End of Patches =========="#);
    }

    let programs = match compile_source(&patch_file, &PrettyErrorHandler::new(&patch_file)) {
        Some(programs) => programs,
        None => bail!("cannot compile {}", patch_file.name),
    };

    let mut file = match Parser::new(ParseOption::default()).parse_file(&source.text) {
        Ok(file) => file,
        Err(e) => {
            PrettyErrorHandler::new(&source).syntax_error(&e);
            bail!("cannot parse {}", source.name)
        }
    };

    let changed = Session::new(&source)
        .with_option(option)
        .apply(&programs, &mut file)
        .with_context(|| format!("cannot apply {} to {}", patch_file.name, source.name))?;
    debug!("changed ranges: {:?}", changed);

    if show.dump_tree {
        println!(r#"=============== AST =============="#);
        to_writer(io::stdout().lock(), &file)?;
        println!(r#"=========== End of AST ==========="#);
    }

    Ok(print_file(&file, &source, &changed, &PrintOption::default()))
}
