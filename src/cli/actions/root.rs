use crate::{env::Environment, project::ProjectRoot};
use anyhow::Result;

/// Print the project root, or its migrations directory.
///
/// # Errors
/// Returns an error if no project root can be found.
pub fn execute(migrations: bool) -> Result<()> {
    let env = Environment::from_process();
    let finder = ProjectRoot::new(&env);
    let path = if migrations {
        finder.migrations_dir()?
    } else {
        finder.find()?
    };
    println!("{}", path.display());
    Ok(())
}
