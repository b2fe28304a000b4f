// Time handling module
pub mod parse; // Free-form time-of-day input
pub mod source; // Time source abstraction and the zone-bound clock
