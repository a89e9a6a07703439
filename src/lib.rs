/*!
# Account Dashboard

The core of a small CRM dashboard for managing business accounts, built in Rust.

## Overview

An account is a company contact record: name, email, phone, website, industry,
an active/inactive status and a free-text remark. The crate keeps the account
collection in memory, persists it after every change, derives the dashboard
figures from it, and moves accounts in and out through CSV and XLSX files.

## Architecture

### Domain Layer
- **Account Store** - The authoritative, ordered collection (newest first) with
  create, replace, delete and reset-to-seed operations and change observers
- **Record Form** - Validation of typed input and the status wording to boolean
  translation
- **Tabular Browser** - Filter, sort and paginate the collection, confirmed
  deletes, and export selection (current page, all, or a 1-based range)

### Derived Views
- Summary counts (total, active, inactive, new entries)
- Industry distribution capped at the four largest groups plus "Other"
- Goal percentage (share of active accounts)
- An XLSX management report with summary and industry sheets

### Data Persistence Layer
- Snapshot of the whole collection with Gzip compression and bincode serialization
- Written through after every mutation, restored on startup
- Pluggable backends (file system or memory)

### Import / Export
- Bulk import from CSV or XLSX with placeholder defaults for missing fields
- Export of a selection to XLSX (or CSV) with fixed column headers

### Web Host (feature `web`)
- **Technologies**: Rust, axum, tokio
- JSON API over the modules above

## Modules

- **account**: Account record, identifiers, industry catalogue, seed data
- **store**: In-memory account collection and change notification
- **saving**: Snapshot persistence with compression
- **report**: Summary counts, industry distribution, goal percentage, report workbook
- **browser**: Table state (filter, sort, pages), delete confirmation, export selection
- **form**: Create / edit form and validation
- **loader**: CSV / XLSX import
- **downloader**: XLSX / CSV export
- **config**: Runtime settings
- **error**: Error types shared by every module
- **app**: Routing and handlers (feature `web`)

## REST API Endpoints

- `GET /api/accounts` - One table page (`q`, `sort`, `dir`, `page`)
- `POST /api/accounts`, `PUT /api/accounts/{id}` - Submit the form
- `DELETE /api/accounts/{id}` - Confirmed delete
- `POST /api/accounts/reset` - Restore the seed set
- `GET /api/summary`, `GET /api/industries` - Dashboard figures
- `GET /api/export` - XLSX download (`scope=current|all|range`, `range=3-7`)
- `POST /api/import` - Multipart upload of a CSV / XLSX file
- `GET /api/report`, `GET /api/template` - Report workbook and import template
*/

pub mod account;
pub mod browser;
pub mod config;
pub mod downloader;
pub mod error;
pub mod form;
pub mod loader;
pub mod report;
pub mod saving;
pub mod store;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the commonly used types at the crate root
pub use account::*;
pub use browser::*;
pub use config::*;
pub use error::*;
pub use form::*;
pub use store::*;
