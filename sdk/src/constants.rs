// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

// Env values used by airx.
pub const AIRX_SECRET_ID: &str = "AIRX_SECRET_ID";
pub const AIRX_SECRET_KEY: &str = "AIRX_SECRET_KEY";
pub const AIRX_DOMAIN: &str = "AIRX_DOMAIN";
pub const AIRX_SECURE: &str = "AIRX_SECURE";
pub const AIRX_SIGNATURE_METHOD: &str = "AIRX_SIGNATURE_METHOD";

/// Host used when no domain is configured.
pub const DEFAULT_DOMAIN: &str = "api.airdwing.com";

// Parameters injected into every signed request.
pub const SECRET_ID: &str = "SecretId";
pub const TIMESTAMP: &str = "Timestamp";
pub const NONCE: &str = "Nonce";
pub const SIGNATURE: &str = "Signature";

/// Nonce is drawn from `0..NONCE_UPPER_BOUND`.
pub const NONCE_UPPER_BOUND: u32 = 65535;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const ACCEPT_ANY: &str = "application/json, text/plain, */*";
