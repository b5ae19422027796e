mod health;
mod integrations;
mod me;
