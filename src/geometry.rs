//! Geometrische Hilfsfunktionen für die Belegung der Ladefläche.
//!
//! Dieses Modul prüft Überschneidungen zwischen platzierten Stapeln und ob ein
//! Stapel die Grenzen der Ladefläche einhält.

use crate::model::{Placement, TruckBed};
use crate::types::{Footprinted, Positioned};

/// Prüft, ob zwei platzierte Stapel sich auf der Ladefläche überschneiden.
///
/// Zwei Rechtecke überschneiden sich NICHT, wenn sie in mindestens einer Achse
/// getrennt sind. Berührende Kanten zählen nicht als Überschneidung.
pub fn intersects(a: &(impl Positioned + Footprinted), b: &(impl Positioned + Footprinted)) -> bool {
    let (ax, ay) = a.origin();
    let (bx, by) = b.origin();
    let fa = a.footprint();
    let fb = b.footprint();

    !(ax + fa.length <= bx || bx + fb.length <= ax || ay + fa.width <= by || by + fb.width <= ay)
}

/// Prüft, ob der Stapel quer über die Ladefläche hinausragt.
pub fn exceeds_bed_width(placement: &Placement, bed: &TruckBed) -> bool {
    placement.y_end() > bed.width
}

/// Prüft, ob der Stapel über das Ende der Ladefläche hinausragt.
pub fn exceeds_bed_length(placement: &Placement, bed: &TruckBed) -> bool {
    placement.x_end() > bed.length
}
