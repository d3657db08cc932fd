// artmgr - Artifact Repository Manager
// Copyright (C) 2025 artmgr Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Interactive password prompt for network-share targets

use artmgr_transport::{CredentialPrompt, ShareAddress, TransportError, TransportResult};
use dialoguer::Password;

/// Asks for share passwords on the terminal
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn password(&self, address: &ShareAddress) -> TransportResult<String> {
        let prompt = format!(
            "Password for {}\\{} on \\\\{}\\{}",
            address.domain, address.user, address.host, address.share
        );
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| TransportError::Credential(e.to_string()))
    }
}
