/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

pub mod common;
pub mod events;
pub mod folders;
pub mod items;
pub mod properties;
pub mod response;
pub mod soap;

pub use common::*;
pub use events::*;
pub use folders::*;
pub use items::*;
pub use properties::*;
pub use response::*;
pub use soap::{Envelope, Fault, FaultDetail};
