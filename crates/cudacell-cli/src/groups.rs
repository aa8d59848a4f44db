//! Groups command implementation for cudacell CLI.

use cudacell_core::{SHARED_GROUP, Session};

use crate::colors;

/// List the groups of the work directory, or the files of one group.
pub fn execute(session: &Session, group: Option<&str>) -> anyhow::Result<()> {
    let store = session.store();

    let Some(group) = group else {
        let groups = store.groups()?;
        if groups.is_empty() {
            eprintln!(
                "{}No groups in {}{}",
                colors::DIM,
                session.workdir().display(),
                colors::RESET
            );
            return Ok(());
        }

        for name in groups {
            if name == SHARED_GROUP {
                println!("{} {}(included in every build){}", name, colors::DIM, colors::RESET);
            } else {
                println!("{}", name);
            }
        }
        return Ok(());
    };

    for file in store.files(group)? {
        println!("{}", file);
    }
    Ok(())
}
