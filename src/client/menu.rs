//! # Interactive Control Loop
//!
//! Terminal front-end over [`ControlClient`]: log in, then offer the menu for
//! the role the server granted. Runs alongside the note listener, sharing
//! nothing with it but the terminal.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::client::client::ControlClient;
use crate::common::messages::{Response, Role};

/// Line-oriented prompt over stdin.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one trimmed line. `None` on end of input.
    pub async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }
}

pub struct Menu {
    client: ControlClient,
    prompt: Prompt,
}

impl Menu {
    pub fn new(client: ControlClient, prompt: Prompt) -> Self {
        Self { client, prompt }
    }

    /// Log in and run the menu for the granted role until the user exits.
    pub async fn run(mut self) -> Result<()> {
        let role = match self.login().await? {
            Some(role) => role,
            None => {
                println!("Login failed. Exiting.");
                return Ok(());
            }
        };

        match role {
            Role::Voter => self.voter_loop().await?,
            Role::Admin => self.admin_loop().await?,
        }

        let response = self.client.logout().await?;
        println!("Server: {}", response.message);
        Ok(())
    }

    async fn login(&mut self) -> Result<Option<Role>> {
        println!("--- Login ---");
        let Some(username) = self.prompt.ask("Username: ").await? else {
            return Ok(None);
        };
        let Some(secret) = self.prompt.ask("Secret: ").await? else {
            return Ok(None);
        };

        let response = self.client.login(&username, &secret).await?;
        println!("Server: {}", response.message);
        Ok(response.role.filter(|_| response.is_ok()))
    }

    async fn voter_loop(&mut self) -> Result<()> {
        loop {
            println!("\n--- Voter Menu ---");
            println!("1. List candidates");
            println!("2. Vote");
            println!("3. Exit");

            let Some(choice) = self.prompt.ask("> ").await? else {
                return Ok(());
            };

            match choice.as_str() {
                "1" => {
                    let response = self.client.get_candidates().await?;
                    print_candidates(&response);
                }
                "2" => {
                    let Some(input) = self.prompt.ask("Candidate ID: ").await? else {
                        return Ok(());
                    };
                    match input.parse() {
                        Ok(id) => {
                            let response = self.client.vote(id).await?;
                            println!("Server: {}", response.message);
                        }
                        Err(_) => println!("Invalid ID. It must be a number."),
                    }
                }
                "3" => return Ok(()),
                _ => println!("Invalid option."),
            }
        }
    }

    async fn admin_loop(&mut self) -> Result<()> {
        loop {
            println!("\n--- Admin Menu ---");
            println!("1. Add candidate");
            println!("2. Send note");
            println!("3. Exit");

            let Some(choice) = self.prompt.ask("> ").await? else {
                return Ok(());
            };

            match choice.as_str() {
                "1" => {
                    let Some(name) = self.prompt.ask("Candidate name: ").await? else {
                        return Ok(());
                    };
                    let response = self.client.add_candidate(&name).await?;
                    println!("Server: {}", response.message);
                }
                "2" => {
                    let Some(text) = self.prompt.ask("Note: ").await? else {
                        return Ok(());
                    };
                    let response = self.client.send_note(&text).await?;
                    println!("Server: {}", response.message);
                }
                "3" => return Ok(()),
                _ => println!("Invalid option."),
            }
        }
    }
}

fn print_candidates(response: &Response) {
    if !response.is_ok() {
        println!("Error: {}", response.message);
        return;
    }

    println!("--- Candidates ---");
    for candidate in response.candidates.iter().flatten() {
        println!("  ID: {} - Name: {}", candidate.id, candidate.name);
    }
}
