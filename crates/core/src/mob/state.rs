#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobState {
    Spawning,
    Idle,
    Patrol,
    Alert,
    Pursuing,
    Attacking,
    Stunned,
    Fleeing,
    Casting,
    Enraged,
    Guarding,
    Dead,
}
