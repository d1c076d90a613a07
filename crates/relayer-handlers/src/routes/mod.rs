// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
/// Module for handling relayer info API
mod info;
pub use info::*;

/// Module for handling the entity directory API
mod entities;
pub use entities::*;

/// Module for handling the result cache API
mod outcomes;
pub use outcomes::*;

/// Module for handling the resolution API
mod resolve;
pub use resolve::*;

/// Module for handling relayer metric API
mod metric;
pub use metric::*;
