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

//! Names of the files and folders inside a repository

/// Persisted repository options
pub const OPTIONS: &str = "options";
/// Table of every object the repository holds
pub const INDEX: &str = "index";
/// Folder of branch refs
pub const REFS: &str = "refs";
/// Newline separated list of branch names
pub const BRANCHES: &str = "branches";
/// Folder of branch log messages
pub const LOGS: &str = "logs";
/// Folder of sharded object contents
pub const OBJECTS: &str = "objects";

pub const README_HTML_NAME: &str = "README.html";
pub const README_NAME: &str = "README";

pub fn ref_path(branch: &str) -> String {
    format!("{REFS}/{branch}")
}

pub fn log_path(branch: &str) -> String {
    format!("{LOGS}/{branch}")
}

/// Parent folder of a repository path, if it has one
pub fn parent_folder(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(head, _)| head).filter(|h| !h.is_empty())
}

/// Landing page written at the root of every repository
pub const README_HTML: &str = r#"<html><body>
<p>
This folder contains a managed artifact repository, holding artifacts
to deploy on top of a local folder (typically a git-managed working area,
but not necessarily). Artifacts are versioned through "artifact branches":
sets of files that go together.
</p>
<p>
It is operated with the <code>artmgr</code> tool. Do not modify
files manually.
</p>
<p>
Note: though its structure resembles a Git repository, it cannot be
managed with Git commands.
</p>
</body></html>"#;

/// Plain text form of an HTML buffer: tags dropped, text kept
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}
