use crate::wire::Vector2;

#[derive(Debug, Clone)]
pub struct Room {
    pub id: (i32, i32),
    pub position: Vector2,
    pub size: (f32, f32),
    pub connections: Vec<(i32, i32)>,
    pub completed: bool,
}

impl Room {
    pub fn bounds(&self) -> (Vector2, Vector2) {
        let half = Vector2(self.size.0 / 2.0, self.size.1 / 2.0);
        (self.position - half, self.position + half)
    }

    pub fn contains(&self, point: Vector2) -> bool {
        let (min, max) = self.bounds();
        point.0 >= min.0 && point.0 <= max.0 && point.1 >= min.1 && point.1 <= max.1
    }
}

/// A room position where a team may complete an extraction action over
/// `required_time_secs` to win the match (spec 3, 4.13).
#[derive(Debug, Clone, Copy)]
pub struct ExtractionPoint {
    pub id: u32,
    pub position: Vector2,
    pub room_id: (i32, i32),
    pub active: bool,
    pub required_time_secs: f32,
    pub progress_team: Option<u8>,
    pub elapsed_secs: f32,
}

impl ExtractionPoint {
    pub fn new(id: u32, position: Vector2, room_id: (i32, i32), required_time_secs: f32) -> Self {
        Self {
            id,
            position,
            room_id,
            active: true,
            required_time_secs,
            progress_team: None,
            elapsed_secs: 0.0,
        }
    }
}
