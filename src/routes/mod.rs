// # Routes Module
//
// - This module contains all HTTP route handlers for the Sandbox Server.
// - Routes are organized by functionality into separate submodules.
//
//  ## Available Route Modules
// - `health`: Health check and monitoring endpoints
// - `ledger`: Transaction submission and account inspection endpoints

/// Health check and monitoring endpoints
pub mod health;

/// Transaction submission and account inspection endpoints
pub mod ledger;
