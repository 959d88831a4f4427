//! Contact command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use onboard_core::domain::contact::{Contact, ContactRole};

use crate::config::Config;

/// Contact subcommands
#[derive(Subcommand)]
pub enum ContactCommands {
    /// List contacts
    List,
    /// Add a contact
    Add {
        #[arg(short, long)]
        name: String,

        /// producer or internal
        #[arg(short, long)]
        role: ContactRole,

        #[arg(short, long, default_value = "")]
        team: String,

        /// Email or other way to reach them
        #[arg(short, long, default_value = "")]
        contact_info: String,
    },
    /// Delete a contact by name
    Delete { name: String },
}

/// Handle contact commands
///
/// # Arguments
/// * `command` - The contact command to execute
/// * `config` - The CLI configuration
pub fn handle_contact_command(command: ContactCommands, config: &Config) -> Result<()> {
    match command {
        ContactCommands::List => list_contacts(config),
        ContactCommands::Add {
            name,
            role,
            team,
            contact_info,
        } => {
            let mut contact = Contact::new(name, role, team);
            contact.contact_info = contact_info;
            add_contact(config, contact)
        }
        ContactCommands::Delete { name } => delete_contact(config, &name),
    }
}

fn list_contacts(config: &Config) -> Result<()> {
    let board = config.open_board()?;
    let contacts = &board.document().contacts;

    if contacts.is_empty() {
        println!("{}", "No contacts found.".yellow());
        return Ok(());
    }

    for role in [ContactRole::Producer, ContactRole::Internal] {
        let members: Vec<&Contact> = contacts.iter().filter(|c| c.role == role).collect();
        if members.is_empty() {
            continue;
        }
        println!("{}", format!("{} ({})", role, members.len()).bold());
        for contact in members {
            print!("  {} {}", "▸".cyan(), contact.name.bold());
            if !contact.team.is_empty() {
                print!(" {}", format!("[{}]", contact.team).dimmed());
            }
            if !contact.contact_info.is_empty() {
                print!(" {}", contact.contact_info.dimmed());
            }
            println!();
        }
        println!();
    }

    Ok(())
}

fn add_contact(config: &Config, contact: Contact) -> Result<()> {
    let mut board = config.open_board()?;
    let name = contact.name.clone();

    board.add_contact(contact)?;

    println!("{}", format!("✓ Added contact '{}'", name).green().bold());
    Ok(())
}

fn delete_contact(config: &Config, name: &str) -> Result<()> {
    let mut board = config.open_board()?;

    let removed = board.remove_contact(name)?;

    println!(
        "{}",
        format!("✓ Deleted contact '{}'", removed.name).green().bold()
    );
    Ok(())
}
