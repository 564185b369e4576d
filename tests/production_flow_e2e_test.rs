// ==========================================
// 生产跟踪端到端集成测试
// ==========================================
// 目标: 验证从订单入产到结算移交的完整业务流程
// 覆盖: ProductionApi → Engine → Repository → ActionLog
// ==========================================


#[cfg(test)]
mod production_flow_e2e_test {
    use crate::test_helpers::{
        approved_record, create_test_state, record_with_status, PRODUCTION_STAGE_IDS,
    };
    use garment_production::api::{ApiError, ApiResult, ProductionApi};
    use garment_production::app::AppState;
    use garment_production::domain::job::ProductionJob;
    use garment_production::domain::stage::StageId;
    use garment_production::domain::types::{
        OrderStatus, ProductionStatus, QcResult, QualityStatus, StageStatus,
    };
    use garment_production::engine::{StageUpdate, WorkflowEngine};
    use garment_production::repository::inventory_repo::InventoryMaterial;
    use garment_production::repository::production_job_repo::ProductionJobRepository;
    use garment_production::repository::RepositoryError;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn set_stage(
        api: &ProductionApi,
        job_order_id: &str,
        stage: &str,
        status: StageStatus,
        remarks: &str,
    ) -> ApiResult<ProductionJob> {
        api.update_stage(job_order_id, stage, status, None, None, remarks, "line-lead")
    }

    fn inspect(
        api: &ProductionApi,
        job_order_id: &str,
        result: QcResult,
        notes: &str,
        return_to: Option<&str>,
    ) -> ApiResult<ProductionJob> {
        api.record_qc_inspection(job_order_id, result, &[], notes, return_to, "qc-inspector")
    }

    fn complete_production(api: &ProductionApi, job_order_id: &str) {
        for stage in PRODUCTION_STAGE_IDS {
            set_stage(api, job_order_id, stage, StageStatus::Completed, "").unwrap();
        }
    }

    #[test]
    fn test_t_shirt_order_flows_to_billing() {
        garment_production::logging::init_test();
        let (_tmp, state) = create_test_state().unwrap();
        let api = &state.production_api;

        let records = [approved_record("JO-1", "T-Shirt", 10)];
        let summary = api.ingest_approved_job_orders(&records, "order-sync").unwrap();
        assert_eq!(summary.created, vec!["JO-1".to_string()]);

        let job = api.get_job("JO-1").unwrap();
        assert_eq!(job.estimated_fabric_usage, 12.0);
        assert_eq!(job.production_status, ProductionStatus::NotStarted);
        assert_eq!(job.current_stage_id, StageId::PatternMaking);
        assert!(job.stages.iter().all(|s| s.status == StageStatus::Pending));

        // 逐道工序: 开工 → 完工
        for stage in PRODUCTION_STAGE_IDS {
            let started = set_stage(api, "JO-1", stage, StageStatus::InProgress, "").unwrap();
            assert_eq!(started.production_status, ProductionStatus::InProgress);
            set_stage(api, "JO-1", stage, StageStatus::Completed, "ok").unwrap();
        }
        let job = api.get_job("JO-1").unwrap();
        assert_eq!(job.current_stage_id, StageId::QualityControl);
        assert!(job.date_started.is_some());

        let job = api
            .record_qc_inspection(
                "JO-1",
                QcResult::Passed,
                &["measurements".to_string(), "stitching".to_string()],
                "",
                None,
                "qc-inspector",
            )
            .unwrap();
        assert_eq!(job.quality_status, QualityStatus::Passed);
        assert_eq!(job.current_stage_id, StageId::Packaging);
        assert_eq!(job.stage(StageId::QualityControl).status, StageStatus::Completed);
        assert_eq!(job.stage(StageId::QualityControl).remarks, "Result: PASSED");

        let job = api.complete_packaging("JO-1", "20 per carton", "packer").unwrap();
        assert!(job.ready_for_billing);
        assert!(job.packaging_completed);
        assert_eq!(job.production_status, ProductionStatus::Completed);
        assert!(job.invariant_violations().is_empty());

        let billable = api.list_billable().unwrap();
        assert_eq!(billable.len(), 1);
        assert_eq!(billable[0].job_order_id, "JO-1");
        assert_eq!(billable[0].order_id, "ORD-JO-1");
        assert!(billable[0].date_completed.is_some());

        // 入产 1 + 工序 8 + 质检 1 + 包装 1
        assert_eq!(api.list_action_logs("JO-1").unwrap().len(), 11);
        let latest = state.action_log_repo.find_recent(1).unwrap();
        assert_eq!(latest[0].action_type, "COMPLETE_PACKAGING");
    }

    #[test]
    fn test_ingest_is_idempotent_across_restarts() {
        let (tmp, state) = create_test_state().unwrap();
        let records = vec![
            approved_record("JO-1", "Pants", 5),
            approved_record("JO-2", "Jacket", 2),
            record_with_status("JO-3", OrderStatus::Pending),
            record_with_status("JO-4", OrderStatus::Rejected),
        ];

        let first = state
            .production_api
            .ingest_approved_job_orders(&records, "order-sync")
            .unwrap();
        assert_eq!(first.created.len(), 2);
        assert_eq!(first.skipped, 2);

        let api = &state.production_api;
        set_stage(api, "JO-1", "pattern_making", StageStatus::InProgress, "").unwrap();

        // 同一数据库重新组装
        drop(state);
        let reopened = AppState::new(tmp.path().to_string_lossy().to_string()).unwrap();
        let second = reopened
            .production_api
            .ingest_approved_job_orders(&records, "order-sync")
            .unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped, 4);

        let jobs = reopened.production_api.list_jobs().unwrap();
        assert_eq!(jobs.len(), 2);
        let jo1 = reopened.production_api.get_job("JO-1").unwrap();
        assert_eq!(jo1.stage(StageId::PatternMaking).status, StageStatus::InProgress);
        assert_eq!(jo1.estimated_fabric_usage, 10.0);
    }

    #[test]
    fn test_failed_inspection_rework_loop() {
        let (_tmp, state) = create_test_state().unwrap();
        let api = &state.production_api;
        api.ingest_approved_job_orders(&[approved_record("JO-7", "Uniform", 12)], "order-sync")
            .unwrap();
        complete_production(api, "JO-7");

        let job = inspect(api, "JO-7", QcResult::Failed, "uneven hem", Some("sewing")).unwrap();
        assert_eq!(job.production_status, ProductionStatus::OnHold);
        assert_eq!(job.quality_status, QualityStatus::Failed);
        assert_eq!(job.current_stage_id, StageId::Sewing);
        let sewing = job.stage(StageId::Sewing);
        assert_eq!(sewing.status, StageStatus::Pending);
        assert!(sewing.completion_date.is_none());

        // 返工未完成前不能再次质检
        let err = inspect(api, "JO-7", QcResult::Passed, "", None).unwrap_err();
        assert_eq!(err.workflow_kind(), Some("ProductionIncomplete"));

        set_stage(api, "JO-7", "sewing", StageStatus::InProgress, "rework").unwrap();
        let job = set_stage(api, "JO-7", "sewing", StageStatus::Completed, "hem fixed").unwrap();
        assert_eq!(job.production_status, ProductionStatus::OnHold);

        let hem = ["hem".to_string()];
        let job = api
            .record_qc_inspection("JO-7", QcResult::Passed, &hem, "", None, "qc-inspector")
            .unwrap();
        assert_eq!(job.production_status, ProductionStatus::InProgress);
        assert_eq!(job.qc_inspections.len(), 2);
        assert_eq!(job.qc_inspections[0].result, QcResult::Failed);
        assert_eq!(job.qc_inspections[0].return_to_stage_id, Some(StageId::Sewing));

        let err = inspect(api, "JO-7", QcResult::Failed, "late defect", Some("cutting"))
            .unwrap_err();
        assert_eq!(err.workflow_kind(), Some("QCAlreadyPassed"));

        api.complete_packaging("JO-7", "", "packer").unwrap();
        let job = api.get_job("JO-7").unwrap();
        assert_eq!(job.stage(StageId::Packaging).remarks, "Packaging completed");
        assert!(job.invariant_violations().is_empty());
    }

    #[test]
    fn test_gates_and_completed_job_is_immutable() {
        let (_tmp, state) = create_test_state().unwrap();
        let api = &state.production_api;
        api.ingest_approved_job_orders(&[approved_record("JO-9", "Polo Shirt", 4)], "order-sync")
            .unwrap();

        let err = set_stage(api, "JO-9", "quality_control", StageStatus::Completed, "")
            .unwrap_err();
        assert_eq!(err.workflow_kind(), Some("QCRequiresInspection"));

        let err = set_stage(api, "JO-9", "packaging", StageStatus::InProgress, "").unwrap_err();
        assert_eq!(err.workflow_kind(), Some("PackagingRequiresPassedQC"));

        let err = inspect(api, "JO-9", QcResult::Passed, "", None).unwrap_err();
        assert_eq!(err.workflow_kind(), Some("ProductionIncomplete"));

        set_stage(api, "JO-9", "pattern_making", StageStatus::InProgress, "").unwrap();
        let err = set_stage(api, "JO-9", "cutting", StageStatus::InProgress, "").unwrap_err();
        assert_eq!(err.workflow_kind(), Some("PreviousStageIncomplete"));

        set_stage(api, "JO-9", "pattern_making", StageStatus::Completed, "").unwrap();
        for stage in &PRODUCTION_STAGE_IDS[1..] {
            set_stage(api, "JO-9", stage, StageStatus::Completed, "").unwrap();
        }
        inspect(api, "JO-9", QcResult::Passed, "", None).unwrap();
        api.complete_packaging("JO-9", "", "packer").unwrap();

        let err = set_stage(api, "JO-9", "cutting", StageStatus::Pending, "").unwrap_err();
        assert_eq!(err.workflow_kind(), Some("JobAlreadyCompleted"));
        let err = api.complete_packaging("JO-9", "", "packer").unwrap_err();
        assert_eq!(err.workflow_kind(), Some("JobAlreadyCompleted"));
    }

    #[test]
    fn test_stale_snapshot_is_rejected() {
        let (tmp, state) = create_test_state().unwrap();
        state
            .production_api
            .ingest_approved_job_orders(&[approved_record("JO-5", "Dress Shirt", 3)], "order-sync")
            .unwrap();

        // 另一会话持有的旧快照
        let other_conn = Connection::open(tmp.path()).unwrap();
        let other_repo = ProductionJobRepository::new(Arc::new(Mutex::new(other_conn)));
        let snapshot = other_repo.find_by_id("JO-5").unwrap().unwrap();

        let api = &state.production_api;
        set_stage(api, "JO-5", "pattern_making", StageStatus::Completed, "").unwrap();

        let stale = WorkflowEngine::new()
            .start_or_advance_stage(
                &snapshot,
                &StageUpdate::new(StageId::PatternMaking, StageStatus::InProgress),
                chrono::Local::now().date_naive(),
            )
            .unwrap();
        match other_repo.save(&stale) {
            Err(RepositoryError::OptimisticLockFailure { expected, actual, .. }) => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected OptimisticLockFailure, got {:?}", other),
        }

        let api_err: ApiError = RepositoryError::OptimisticLockFailure {
            job_order_id: "JO-5".to_string(),
            expected: 0,
            actual: 1,
        }
        .into();
        assert!(matches!(api_err, ApiError::OptimisticLockFailure(_)));

        let job = state.production_api.get_job("JO-5").unwrap();
        assert_eq!(job.stage(StageId::PatternMaking).status, StageStatus::Completed);
    }

    #[test]
    fn test_material_check_and_statistics() {
        let (_tmp, state) = create_test_state().unwrap();
        let api = &state.production_api;
        api.ingest_approved_job_orders(
            &[
                approved_record("JO-1", "T-Shirt", 10),
                approved_record("JO-2", "Unknown Garment", 2),
            ],
            "order-sync",
        )
        .unwrap();

        state
            .inventory_repo
            .upsert(&InventoryMaterial {
                material_name: "Cotton Jersey".to_string(),
                available_qty: 15.0,
                unit: "meters".to_string(),
            })
            .unwrap();
        state
            .config_manager
            .set_config_value("inventory.fabric_unit", "yards")
            .unwrap();

        let check = api.check_material_availability("JO-1").unwrap();
        assert!(check.sufficient);
        assert_eq!(check.required, 12.0);
        assert_eq!(check.unit, "yards");
        assert_eq!(check.shortage(), 0.0);

        // 未识别款式按默认 1.5
        assert_eq!(api.get_job("JO-2").unwrap().estimated_fabric_usage, 3.0);

        set_stage(api, "JO-2", "pattern_making", StageStatus::InProgress, "").unwrap();
        let stats = api.get_statistics().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.not_started, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.ready_for_billing, 0);

        let filtered = api
            .filter_jobs(Some(ProductionStatus::InProgress), Some("pattern_making"))
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].job_order_id, "JO-2");

        let err = api.filter_jobs(None, Some("steaming")).unwrap_err();
        assert_eq!(err.workflow_kind(), Some("UnknownStage"));
    }
}
