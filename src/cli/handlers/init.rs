use std::fs;

use crate::cli::commands::InitArgs;
use crate::io::config_io;

use super::Ctx;

const CONFIG_TOML_TEMPLATE: &str = r##"# tasklist configuration

[tasks]
# Category used by `tl add` when -c is not given
default_category = "General"

# Categories offered for new tasks. Add more with: tl category add <name>
categories = ["General", "Work", "Personal", "Home"]
"##;

pub(super) fn cmd_init(ctx: &Ctx, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_io::config_path(&ctx.data_dir);
    if path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    fs::create_dir_all(&ctx.data_dir)?;
    fs::write(&path, CONFIG_TOML_TEMPLATE)?;
    println!("initialized {}", ctx.data_dir.display());
    Ok(())
}
