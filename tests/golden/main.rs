mod lib;

mod failure;
mod listing;
mod params;
mod verbose_fixtures;
