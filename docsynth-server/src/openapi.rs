//! OpenAPI specification for the docsynth server.

use utoipa::OpenApi;

use docsynth_core::{
    AnalysisStatus, AnnotateMode, ComplianceIssue, ComplianceReport, CoverageReport, DocStyle,
    FileAnalysis,
};

use crate::routes::{
    AnalyzeRequest, AnalyzeResponse, BatchAnalyzeRequest, BatchAnalyzeResponse, BatchFile,
    ErrorResponse, RequestOptions, StyleOption, StylesResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::analyze,
        crate::routes::analyze_batch,
        crate::routes::styles,
        crate::routes::openapi_json
    ),
    components(
        schemas(
            AnalyzeRequest,
            AnalyzeResponse,
            BatchFile,
            BatchAnalyzeRequest,
            BatchAnalyzeResponse,
            RequestOptions,
            StyleOption,
            StylesResponse,
            ErrorResponse,
            FileAnalysis,
            AnalysisStatus,
            AnnotateMode,
            DocStyle,
            CoverageReport,
            ComplianceReport,
            ComplianceIssue
        )
    ),
    tags(
        (name = "analysis", description = "Docstring synthesis and validation"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI specification for the docsynth server.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn openapi_includes_expected_paths() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;

        assert!(paths.contains_key("/analyze"));
        assert!(paths.contains_key("/analyze/batch"));
        assert!(paths.contains_key("/styles"));
        assert!(paths.contains_key("/openapi.json"));
    }

    #[test]
    fn openapi_registers_analysis_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;

        assert!(schemas.contains_key("FileAnalysis"));
        assert!(schemas.contains_key("AnalyzeRequest"));
        assert!(schemas.contains_key("DocStyle"));
    }
}
