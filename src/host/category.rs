//! Entity-collection categories.
//!
//! A part hands out one entity collection per category. The numbering
//! follows the host's `Obj3dType` enumeration; ids the host does not know
//! are reported by the lookup as unsupported, so [`EntityCategory::Other`]
//! can be used to probe categories added by newer host versions.

use std::fmt;

macro_rules! entity_categories {
    ($($(#[$meta:meta])* $name:ident = $id:literal,)+) => {
        /// Entity-collection category of a part.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EntityCategory {
            $($(#[$meta])* $name,)+
            /// Any id outside the known set.
            Other(u16),
        }

        impl EntityCategory {
            /// Every category the host is known to expose.
            pub const KNOWN: &'static [EntityCategory] = &[$(EntityCategory::$name,)+];

            /// Numeric identifier passed to the host.
            pub fn id(self) -> u16 {
                match self {
                    $(EntityCategory::$name => $id,)+
                    EntityCategory::Other(id) => id,
                }
            }

            /// Resolve an id, falling back to [`EntityCategory::Other`].
            pub fn from_id(id: u16) -> Self {
                match id {
                    $($id => EntityCategory::$name,)+
                    other => EntityCategory::Other(other),
                }
            }

            /// Name of the category, `"Other"` for unknown ids.
            pub fn name(self) -> &'static str {
                match self {
                    $(EntityCategory::$name => stringify!($name),)+
                    EntityCategory::Other(_) => "Other",
                }
            }
        }
    };
}

entity_categories! {
    PlaneXoy = 1,
    PlaneXoz = 2,
    PlaneYoz = 3,
    PointCs = 4,
    Sketch = 5,
    Face = 6,
    Edge = 7,
    Vertex = 8,
    Axis2Planes = 9,
    AxisOperation = 10,
    AxisEdge = 11,
    AxisConeFace = 12,
    Axis2Points = 13,
    PlaneOffset = 14,
    PlaneAngle = 15,
    Plane3Points = 16,
    PlaneNormal = 17,
    PlaneTangent = 18,
    PlaneEdgePoint = 19,
    PlaneParallel = 20,
    PlanePerpendicular = 21,
    PlaneLineToEdge = 22,
    PlaneLineToPlane = 23,
    BaseExtrusion = 24,
    BossExtrusion = 25,
    CutExtrusion = 26,
    BaseRotated = 27,
    BossRotated = 28,
    CutRotated = 29,
    BaseLoft = 30,
    BossLoft = 31,
    CutLoft = 32,
    Chamfer = 33,
    Fillet = 34,
    MeshCopy = 35,
    CircularCopy = 36,
    CurveCopy = 37,
    CircPartArray = 38,
    MeshPartArray = 39,
    CurvePartArray = 40,
    DerivPartArray = 41,
    Incline = 42,
    ShellOperation = 43,
    RibOperation = 44,
    BaseEvolution = 45,
    BossEvolution = 46,
    CutEvolution = 47,
    MirrorOperation = 48,
    MirrorAllOperation = 49,
    CutByPlane = 50,
    CutBySketch = 51,
    HoleOperation = 52,
    AxisOx = 71,
    AxisOy = 72,
    AxisOz = 73,
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

impl From<u16> for EntityCategory {
    fn from(id: u16) -> Self {
        EntityCategory::from_id(id)
    }
}
