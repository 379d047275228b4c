// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for annotations, video metadata and persisted documents.

pub mod annotation;
pub mod document;
pub mod history;
pub mod metadata;
pub mod store;
